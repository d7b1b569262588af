//! Cancellation helper shared by the download and upload paths.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::types::{Error, Result};

/// Runs `future` until it completes or `token` fires, whichever comes first.
///
/// Cancellation wins ties so a token that is already cancelled never lets a
/// new remote call start.
pub(crate) async fn until_cancelled<F>(
    token: &CancellationToken,
    operation: &'static str,
    future: F,
) -> Result<F::Output>
where
    F: Future,
{
    tokio::select! {
        biased;
        () = token.cancelled() => Err(Error::cancelled(operation)),
        output = future => Ok(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completes_when_not_cancelled() {
        let token = CancellationToken::new();
        let value = until_cancelled(&token, "probe", async { 7 }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn cancelled_token_wins() {
        let token = CancellationToken::new();
        token.cancel();
        let err = until_cancelled(&token, "probe", std::future::pending::<()>())
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "probe cancelled");
    }
}
