pub mod mock;
pub mod process;

use async_trait::async_trait;

use crate::error::Result;

/// An out-of-process program the relay hands one value to and reads text back from.
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// Short label used in logs and error messages.
    fn name(&self) -> &str;

    /// Run once with `value` and return everything it wrote to stdout.
    async fn invoke(&self, value: &str) -> Result<String>;
}
