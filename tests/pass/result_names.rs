use callable_journal::journal;

#[journal(result_names = ["total_sum", "multiplied_values"])]
fn named(a: i32, b: Vec<i32>) -> (i32, Vec<i32>) {
    let multiplied: Vec<i32> = b.iter().map(|item| a * item).collect();
    (multiplied.iter().sum(), multiplied)
}

#[journal(result_names = ["head", _, "last"],)]
fn split(values: [u8; 3]) -> (u8, u8, u8) {
    (values[0], values[1], values[2])
}

#[journal(result_names = "value")]
fn single(value: f64) -> f64 {
    value
}

fn main() {
    assert_eq!(named(2, vec![1, 2]), (6, vec![2, 4]));
    assert_eq!(split([1, 2, 3]), (1, 2, 3));
    assert_eq!(single(0.5), 0.5);
}
