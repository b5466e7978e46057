use chrono::{Duration, NaiveDate, NaiveDateTime};
use fake::faker::company::en::CompanyName;
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use pocket_repo::transaction_repo::{Direction, NewTransaction};
use rand::seq::SliceRandom;

pub trait Generator<T> {
    fn gen(&mut self) -> T;
}

pub struct Predefined<T> {
    values: Vec<T>,
    current_pos: usize,
}

impl<T> Predefined<T> {
    pub fn boxed(values: Vec<T>) -> Box<Predefined<T>> {
        Box::new(Predefined {
            values,
            current_pos: 0,
        })
    }
}

impl<T: Clone> Generator<T> for Predefined<T> {
    fn gen(&mut self) -> T {
        let v = self.values[self.current_pos].clone();
        self.current_pos += 1;
        v
    }
}

pub struct RandomSample<T> {
    values: Vec<T>,
}

impl<T> RandomSample<T> {
    pub fn boxed(values: Vec<T>) -> Box<RandomSample<T>> {
        Box::new(RandomSample { values })
    }
}

impl<T: Clone> Generator<T> for RandomSample<T> {
    fn gen(&mut self) -> T {
        self.values.choose(&mut rand::thread_rng()).unwrap().clone()
    }
}

pub struct Constant<T>(pub T);

impl<T: Clone> Generator<T> for Constant<T> {
    fn gen(&mut self) -> T {
        self.0.clone()
    }
}

/// Between 0.01 and 10 000.00
pub struct FakeAmount;

impl Generator<i64> for FakeAmount {
    fn gen(&mut self) -> i64 {
        (1..1_000_000).fake()
    }
}

/// Some time during 2023
pub struct FakeOccurredAt;

impl Generator<NaiveDateTime> for FakeOccurredAt {
    fn gen(&mut self) -> NaiveDateTime {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        start + Duration::minutes((0..525_600).fake::<i64>())
    }
}

pub struct FakeDescription;

impl Generator<String> for FakeDescription {
    fn gen(&mut self) -> String {
        Sentence(2..6).fake()
    }
}

pub struct FakeMerchant;

impl Generator<Option<String>> for FakeMerchant {
    fn gen(&mut self) -> Option<String> {
        Some(CompanyName().fake())
    }
}

pub struct NewTransactionGenerator {
    amnt_gen: Box<dyn Generator<i64>>,
    dirn_gen: Box<dyn Generator<Direction>>,
    date_gen: Box<dyn Generator<NaiveDateTime>>,
    desc_gen: Box<dyn Generator<String>>,
    mrch_gen: Box<dyn Generator<Option<String>>>,
    tag_gen: Box<dyn Generator<Option<i32>>>,
}

#[allow(dead_code)]
impl NewTransactionGenerator {
    pub fn with_amounts(mut self, amounts: Vec<i64>) -> NewTransactionGenerator {
        self.amnt_gen = Predefined::boxed(amounts);
        self
    }

    pub fn with_directions(mut self, directions: Vec<Direction>) -> NewTransactionGenerator {
        self.dirn_gen = Predefined::boxed(directions);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> NewTransactionGenerator {
        self.dirn_gen = Box::new(Constant(direction));
        self
    }

    pub fn with_dates(mut self, dates: Vec<NaiveDateTime>) -> NewTransactionGenerator {
        self.date_gen = Predefined::boxed(dates);
        self
    }

    pub fn with_date(mut self, date: NaiveDateTime) -> NewTransactionGenerator {
        self.date_gen = Box::new(Constant(date));
        self
    }

    pub fn with_tags(mut self, tags: Vec<Option<i32>>) -> NewTransactionGenerator {
        self.tag_gen = Predefined::boxed(tags);
        self
    }

    pub fn with_tag(mut self, tag: Option<i32>) -> NewTransactionGenerator {
        self.tag_gen = Box::new(Constant(tag));
        self
    }

    pub fn generate(&mut self) -> NewTransaction {
        NewTransaction::new(
            self.amnt_gen.gen(),
            "USD".to_owned(),
            self.dirn_gen.gen(),
            self.date_gen.gen(),
            self.desc_gen.gen(),
            self.mrch_gen.gen(),
            self.tag_gen.gen(),
        )
    }

    pub fn generate_many(&mut self, count: usize) -> Vec<NewTransaction> {
        let mut vec = Vec::with_capacity(count);
        for _ in 0..count {
            vec.push(self.generate())
        }
        vec
    }
}

impl Default for NewTransactionGenerator {
    fn default() -> Self {
        NewTransactionGenerator {
            amnt_gen: Box::new(FakeAmount),
            dirn_gen: RandomSample::boxed(vec![Direction::Income, Direction::Expense]),
            date_gen: Box::new(FakeOccurredAt),
            desc_gen: Box::new(FakeDescription),
            mrch_gen: Box::new(FakeMerchant),
            tag_gen: Box::new(Constant(None)),
        }
    }
}
