use callable_journal::journal;
use std::cell::RefCell;
use std::rc::Rc;

struct Connection;

#[journal(copy_args = "log")]
fn append(log: Rc<RefCell<Vec<String>>>, line: &str) -> usize {
    log.borrow_mut().push(line.to_owned());
    log.borrow().len()
}

#[journal(copy_args = *, drop_args = ["conn"])]
fn query(conn: &Connection, sql: &str) -> Vec<u32> {
    let _ = (conn, sql);
    vec![1, 2, 3]
}

#[journal(drop_args = "password")]
fn login(user: &str, password: &str) -> bool {
    !user.is_empty() && !password.is_empty()
}

fn main() {
    let log = Rc::new(RefCell::new(Vec::new()));
    assert_eq!(append(log.clone(), "first"), 1);
    assert_eq!(query(&Connection, "select 1"), vec![1, 2, 3]);
    assert!(login("ada", "hunter2"));
}
