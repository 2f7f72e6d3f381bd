//! Chronologically ordered, collision-resistant child keys.
//!
//! A key is 20 characters: 8 encode the millisecond timestamp, 12 are random.
//! Keys generated within the same millisecond increment the random part, so
//! keys from one generator always sort in creation order.

use std::sync::Mutex;

use rand::Rng;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";
const RANDOM_LEN: usize = 12;
const TIME_LEN: usize = 8;

#[derive(Debug, Default)]
pub struct PushKeyGenerator {
    last: Mutex<(i64, [u8; RANDOM_LEN])>,
}

impl PushKeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(&self) -> String {
        self.generate_at(chrono::Utc::now().timestamp_millis())
    }

    pub fn generate_at(&self, now_millis: i64) -> String {
        let mut guard = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let (last_time, random) = &mut *guard;

        if now_millis == *last_time {
            for digit in random.iter_mut().rev() {
                if *digit == 63 {
                    *digit = 0;
                } else {
                    *digit += 1;
                    break;
                }
            }
        } else {
            let mut rng = rand::thread_rng();
            for digit in random.iter_mut() {
                *digit = rng.gen_range(0..64);
            }
            *last_time = now_millis;
        }

        let mut key = String::with_capacity(TIME_LEN + RANDOM_LEN);
        let mut time = now_millis.max(0) as u64;
        let mut time_chars = [0u8; TIME_LEN];
        for slot in time_chars.iter_mut().rev() {
            *slot = PUSH_CHARS[(time % 64) as usize];
            time /= 64;
        }
        key.extend(time_chars.iter().map(|&b| b as char));
        key.extend(random.iter().map(|&d| PUSH_CHARS[d as usize] as char));
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_have_fixed_length() {
        let keys = PushKeyGenerator::new();
        assert_eq!(keys.generate().len(), TIME_LEN + RANDOM_LEN);
    }

    #[test]
    fn same_millisecond_keys_are_increasing() {
        let keys = PushKeyGenerator::new();
        let a = keys.generate_at(1_700_000_000_000);
        let b = keys.generate_at(1_700_000_000_000);
        let c = keys.generate_at(1_700_000_000_000);
        assert!(a < b && b < c, "{a} {b} {c}");
    }

    #[test]
    fn later_time_sorts_after() {
        let keys = PushKeyGenerator::new();
        let a = keys.generate_at(1_000);
        let b = keys.generate_at(2_000);
        assert!(a < b);
        assert_eq!(&a[..TIME_LEN], "------Ec");
    }
}
