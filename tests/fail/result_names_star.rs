use callable_journal::journal;

#[journal(result_names = *)]
fn pair() -> (i32, i32) {
    (1, 2)
}

fn main() {}
