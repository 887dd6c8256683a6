use callable_journal::journal;

#[journal(drop_args = ["token", _])]
fn login(user: &str, token: &str) -> bool {
    !user.is_empty() && !token.is_empty()
}

fn main() {}
