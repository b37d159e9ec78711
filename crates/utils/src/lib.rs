use rand::distributions::Alphanumeric;
use rand::Rng;

/// Generates an alphanumeric secret of the given length, used for the
/// delivery-callback key when none is configured.
pub fn create_random_secret(secret_len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(secret_len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_creates_secret_of_requested_length() {
        for len in [0, 1, 16, 30, 64] {
            assert_eq!(create_random_secret(len).len(), len);
        }
    }

    #[test]
    fn secrets_are_not_repeated() {
        assert_ne!(create_random_secret(30), create_random_secret(30));
    }
}
