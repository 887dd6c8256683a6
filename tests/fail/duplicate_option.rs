use callable_journal::journal;

#[journal(objective = "first", objective = "second")]
fn twice(x: i32) -> i32 {
    x * 2
}

fn main() {}
