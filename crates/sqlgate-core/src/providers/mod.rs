pub mod llm;
pub mod replay;
