use py_utils::example_function;
use py_utils::utils::example::GREETING;

#[test]
fn test_example_function_returns_greeting() {
    let result = example_function();
    assert_eq!(result, "Hello from py-utils!");
    assert_eq!(result, GREETING);
}

#[test]
fn test_example_function_is_idempotent() {
    let results: Vec<&str> = (0..50).map(|_| example_function()).collect();
    assert!(results.iter().all(|r| *r == results[0]));
}

#[test]
fn test_example_function_from_many_threads() {
    let handles: Vec<_> = (0..8)
        .map(|_| std::thread::spawn(example_function))
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), "Hello from py-utils!");
    }
}

#[test]
fn test_example_function_signature_takes_no_arguments() {
    let f: fn() -> &'static str = example_function;
    assert!(!f().is_empty());
}
