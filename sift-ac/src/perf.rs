// Quick release mode performance check
//
// Run with: cargo test --release -p sift-ac automaton_perf -- --ignored

#[cfg(test)]
mod perf_tests {
    use crate::build;
    use std::time::Instant;

    #[test]
    #[ignore] // Run with: cargo test --release automaton_perf -- --ignored
    fn automaton_perf() {
        let keywords: Vec<_> = (0..1000).map(|i| format!("banned_{}", i)).collect();
        let automaton = build(&keywords);
        let text = "a perfectly ordinary chat message that mentions banned_742 once";

        // Warmup
        for _ in 0..10000 {
            let _ = automaton.contains_any(text);
        }

        // Benchmark
        let iterations = 1_000_000;
        let start = Instant::now();
        for _ in 0..iterations {
            let _ = automaton.contains_any(text);
        }
        let duration = start.elapsed();
        let ns_per_op = duration.as_nanos() / iterations;

        println!("\n=== Release Mode Automaton Performance ===");
        println!("Keywords: {}", automaton.keyword_count());
        println!("States: {}", automaton.state_count());
        println!("Iterations: {}", iterations);
        println!("Total time: {:?}", duration);
        println!("Per operation: {} ns", ns_per_op);

        assert!(ns_per_op < 5_000, "scan should be fast in release mode, got {} ns/op", ns_per_op);
    }
}
