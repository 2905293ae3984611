// 文本生成协作者

mod client;
#[cfg(feature = "openai-client")]
mod openai;
mod structured;

pub use client::{DynLlmClient, LlmClient, LlmRequest, LlmResponse, ScriptedLlmClient};
#[cfg(feature = "openai-client")]
pub use openai::OpenAiClient;
pub use structured::{extract_json, GenerationFailure, StructuredOutput};
