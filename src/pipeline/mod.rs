pub mod corpus;
pub mod gemini;
pub mod storage;
pub mod rag;
