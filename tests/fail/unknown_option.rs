use callable_journal::journal;

#[journal(result_name = "total")]
fn total(values: Vec<i32>) -> i32 {
    values.iter().sum()
}

fn main() {}
