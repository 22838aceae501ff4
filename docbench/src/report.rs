//! Periodic throughput snapshots and the final run summary.

use std::sync::Arc;
use std::time::{Duration, Instant};

use yansi::Paint;

use crate::experiment::RunState;
use crate::operation::Category;

/// Prints a throughput snapshot once per second until every worker has
/// finished, then a final snapshot plus the run summary.
pub(crate) async fn report(state: Arc<RunState>, started: Instant) {
    let category = state.config.operation.category();

    loop {
        if state.context.pending_workers() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        snapshot(
            category,
            state.context.operations(),
            started.elapsed().as_secs_f64(),
            state.context.total_units(),
        );
    }

    let seconds = started.elapsed().as_secs_f64();
    let operations = state.context.operations();
    let units = state.context.total_units();

    println!();
    println!("{}", "-".repeat(66));
    snapshot(category, operations, seconds, units);
    println!(
        "{}",
        format!(
            "Total (consumed {units:.1} capacity units in {:.0} seconds)",
            seconds.round()
        )
        .bold()
    );
    println!("{}", "-".repeat(66));
}

fn snapshot(category: Category, operations: u64, seconds: f64, units: f64) {
    println!(
        "Performed {} {} operations @ {:.0} operations/s, {:.1} CU/s",
        operations,
        category,
        per_second(operations as f64, seconds).round(),
        per_second(units, seconds),
    );
}

/// Rate over the elapsed time, reporting zero instead of dividing by a zero
/// duration.
fn per_second(value: f64, seconds: f64) -> f64 {
    if seconds > 0.0 { value / seconds } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_elapsed_reports_zero_rates() {
        assert_eq!(per_second(100.0, 0.0), 0.0);
        assert_eq!(per_second(100.0, 2.0), 50.0);
    }
}
