// Tests for the automation engines



#[cfg(test)]
mod test_helpers;
