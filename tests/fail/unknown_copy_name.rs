use callable_journal::journal;

#[journal(copy_args = ["values", "extra"])]
fn total(values: Vec<i32>) -> i32 {
    values.iter().sum()
}

fn main() {}
