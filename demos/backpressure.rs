//! Backpressure demo: a bounded subscriber draining a range in quanta of 2.
//!
//! Run with: `cargo run --example backpressure`

use std::sync::Arc;

use fluxion::{BoundedSubscriber, FnSubscriber, Source};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let numbers = Source::range(1, 10).do_on_request(|n| println!("request granted, n={n}"));

    let sink = Arc::new(
        FnSubscriber::new()
            .next(|value: i64| println!("value {value}"))
            .complete(|| println!("complete")),
    );

    numbers
        .subscribe(Arc::new(BoundedSubscriber::new(sink, 2)))
        .await;
}
