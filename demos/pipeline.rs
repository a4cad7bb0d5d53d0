//! Operator pipeline demo: map, flat_map, error recovery, and log output.
//!
//! Run with: `cargo run --example pipeline`

use std::sync::Arc;

use fluxion::{FnSubscriber, LogWriter, Source, StreamError};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // A healthy pipeline: uppercase each word, then expand it into the word
    // plus an excited variant, with protocol diagnostics on stdout.
    let greetings = Source::from_iter(["mono", "flux"])
        .map(|word| Ok::<_, StreamError>(word.to_uppercase()))
        .flat_map(|word| Source::from_iter([word.clone(), format!("{word}!")]))
        .log("pipeline");

    greetings
        .subscribe_unbounded(|word| println!("received {word}"))
        .await;

    // A failing source, recovered by switching to a replacement stream.
    let recovered = Source::<String>::fail(StreamError::source("backend down"))
        .on_error_resume(|err| Source::just(format!("fallback ({err})")));

    let subscriber = Arc::new(
        FnSubscriber::new()
            .next(|value: String| println!("recovered: {value}"))
            .complete(|| println!("recovered stream completed")),
    );
    recovered.subscribe(subscriber).await;

    // Same failing source, replayed cold into a logging subscriber this time.
    let returned = Source::<String>::fail(StreamError::source("backend down"))
        .on_error_return("default".to_string());
    returned.subscribe(Arc::new(LogWriter)).await;
}
