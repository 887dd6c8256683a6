use callable_journal::journal;

#[journal]
const fn answer() -> i32 {
    42
}

fn main() {}
