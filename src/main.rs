use callable_journal::{JournalSettings, SubscriberSettings, journal};
use serde_json::json;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

fn multiply(a: i32, b: &[i32]) -> (i32, Vec<i32>) {
    let multiplied: Vec<i32> = b.iter().map(|item| a * item).collect();
    (multiplied.iter().sum(), multiplied)
}

/// Raw results, journaled as a list
#[journal(objective = "basic_example")]
fn basic(a: i32, b: Vec<i32>) -> (i32, Vec<i32>) {
    multiply(a, &b)
}

#[journal(result_names = ["total_sum", "multiplied_values"])]
fn named_results(a: i32, b: Vec<i32>) -> (i32, Vec<i32>) {
    multiply(a, &b)
}

#[journal(result_names = ["total_sum", _])]
fn named_ignore_results(a: i32, b: Vec<i32>) -> (i32, Vec<i32>) {
    multiply(a, &b)
}

/// `b` is journaled as it was before the call negated it
#[journal(copy_args = "b", result_names = ["total_sum", "multiplied_values"])]
fn copy_args(a: i32, b: Rc<RefCell<Vec<i32>>>) -> (i32, Vec<i32>) {
    let mut values = b.borrow_mut();
    values.iter_mut().for_each(|value| *value = -*value);
    multiply(a, &values)
}

#[journal(drop_args = "b", result_names = ["total_sum", "multiplied_values"])]
fn drop_args(a: i32, b: Vec<i32>) -> (i32, Vec<i32>) {
    multiply(a, &b)
}

#[derive(Debug)]
struct EmptyInput;

impl fmt::Display for EmptyInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("cannot average an empty list")
    }
}

#[journal(result_names = "mean")]
fn average(values: Vec<i32>) -> Result<f64, EmptyInput> {
    if values.is_empty() {
        return Err(EmptyInput);
    }
    Ok(values.iter().sum::<i32>() as f64 / values.len() as f64)
}

fn main() -> callable_journal::Result<()> {
    let mut settings = JournalSettings::load_from("journal.toml")?;
    settings
        .subscriber
        .get_or_insert_with(SubscriberSettings::default);
    callable_journal::init(&settings, Some(json!({"app_version": "0.1.0"})))?;

    basic(2, vec![1, 2]);
    named_results(2, vec![1, 2]);
    named_ignore_results(2, vec![1, 2]);
    copy_args(2, Rc::new(RefCell::new(vec![1, 2])));
    drop_args(2, vec![1, 2]);

    match average(Vec::new()) {
        Ok(mean) => println!("Mean: {}", mean),
        Err(e) => eprintln!("Average failed: {}", e),
    }

    Ok(())
}
