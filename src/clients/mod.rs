pub mod openai;
pub mod traits;
pub mod webhook;

pub use openai::OpenAiClient;
pub use traits::{
    AudioUpload, ChatCompletion, ChatRequest, InputRole, LlmClient, LlmMessage,
    RealtimeSessionRequest, ResponseInput, ResponsesOutput, ResponsesRequest, WebhookClient,
    WebhookResponse,
};
pub use webhook::HttpWebhookClient;
