pub mod backend;
pub mod counsellor_llm;

pub use backend::HttpBackendAdapter;
pub use counsellor_llm::OpenAiCounsellorAdapter;
