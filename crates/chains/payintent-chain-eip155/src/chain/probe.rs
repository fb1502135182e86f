use futures_util::future::BoxFuture;

/// Awaits `probes` in order and returns the first success.
///
/// Probes after the first success are never polled. When every probe fails,
/// all errors are returned in probe order.
pub async fn first_ok<T, E>(probes: Vec<BoxFuture<'_, Result<T, E>>>) -> Result<T, Vec<E>> {
    let mut errors = Vec::with_capacity(probes.len());
    for probe in probes {
        match probe.await {
            Ok(value) => return Ok(value),
            Err(e) => errors.push(e),
        }
    }
    Err(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let polled = AtomicUsize::new(0);
        let probes: Vec<BoxFuture<'_, Result<u8, &str>>> = vec![
            async { Err("missing") }.boxed(),
            async { Ok(2) }.boxed(),
            async {
                polled.fetch_add(1, Ordering::SeqCst);
                Ok(3)
            }
            .boxed(),
        ];
        assert_eq!(first_ok(probes).await, Ok(2));
        assert_eq!(polled.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_failures_collected() {
        let probes: Vec<BoxFuture<'_, Result<u8, &str>>> =
            vec![async { Err("a") }.boxed(), async { Err("b") }.boxed()];
        assert_eq!(first_ok(probes).await, Err(vec!["a", "b"]));
    }
}
