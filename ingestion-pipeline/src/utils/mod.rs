pub mod chunking;
pub mod url_text_retrieval;
