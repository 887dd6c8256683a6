use callable_journal::journal;

struct Account {
    balance: i64,
}

impl Account {
    fn new(balance: i64) -> Self {
        Self { balance }
    }

    #[journal(result_names = "balance")]
    fn balance(&self) -> i64 {
        self.balance
    }

    #[journal]
    fn deposit(&mut self, amount: i64) {
        self.balance += amount;
    }

    #[journal(objective = "close_account")]
    fn close(self) -> i64 {
        self.balance
    }

    #[journal]
    fn compute<T>(&self, factor: T) -> T
    where
        T: std::ops::Mul<Output = T> + From<i32> + callable_journal::ToDatum,
    {
        T::from(self.balance as i32) * factor
    }
}

fn main() {
    let mut account = Account::new(40);
    account.deposit(2);
    assert_eq!(account.balance(), 42);
    assert_eq!(account.compute(2i64), 84);
    assert_eq!(account.close(), 42);
}
