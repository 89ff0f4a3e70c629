use crate::error::*;

/// Iterator extension for extracting a single row out of a store response
pub trait Single {
    type Item;

    /// Extract a single item from the iterator, erroring if there is less than or more than a single item in it.
    fn single(&mut self) -> FeedResult<Self::Item>;

    /// Extract zero or one item from the iterator, erroring if there is more than a single item in it.
    fn single_or_none(&mut self) -> FeedResult<Option<Self::Item>>;
}

impl<I: Iterator> Single for I {
    type Item = I::Item;

    fn single(&mut self) -> FeedResult<Self::Item> {
        match (self.next(), self.next()) {
            (Some(item), None) => Ok(item),
            (None, _) => Err(FeedError::DataIntegrity(
                "expected a single row, got none".to_string(),
            )),
            (Some(_), Some(_)) => Err(FeedError::DataIntegrity(
                "expected a single row, got more than one".to_string(),
            )),
        }
    }

    fn single_or_none(&mut self) -> FeedResult<Option<Self::Item>> {
        match (self.next(), self.next()) {
            (None, None) => Ok(None),
            (Some(item), None) => Ok(Some(item)),
            (_, Some(_)) => Err(FeedError::DataIntegrity(
                "expected at most one row, got more than one".to_string(),
            )),
        }
    }
}
