pub trait SplittingExt {
    /// Split at the first `delimiter`, returning the whole string and `None` if it is absent.
    fn split_optional(&self, delimiter: char) -> (&str, Option<&str>);

    /// Split at the last `delimiter`, returning the whole string and `None` if it is absent.
    fn rsplit_optional(&self, delimiter: char) -> (&str, Option<&str>);
}

impl SplittingExt for str {
    fn split_optional(&self, delimiter: char) -> (&str, Option<&str>) {
        match self.split_once(delimiter) {
            Some((first, second)) => (first, Some(second)),
            None => (self, None),
        }
    }

    fn rsplit_optional(&self, delimiter: char) -> (&str, Option<&str>) {
        match self.rsplit_once(delimiter) {
            Some((first, second)) => (first, Some(second)),
            None => (self, None),
        }
    }
}
