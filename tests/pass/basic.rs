use callable_journal::journal;

#[journal]
fn add(x: i32, y: i32) -> i32 {
    x + y
}

#[journal(objective = "greeting")]
pub fn greet(name: &str) -> String {
    format!("Hello, {}!", name)
}

#[journal]
fn nothing() {}

fn main() {
    assert_eq!(add(2, 3), 5);
    assert_eq!(greet("world"), "Hello, world!");
    nothing();
}
