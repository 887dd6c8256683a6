use callable_journal::journal;

#[journal]
fn skip(_: i32, count: usize) -> usize {
    count
}

fn main() {}
