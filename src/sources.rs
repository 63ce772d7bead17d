mod interpret_blank;
mod source_token;

pub use self::{interpret_blank::InterpretBlank, source_token::SourceToken};
