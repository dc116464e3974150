use hashbrown::HashMap;

pub trait Similarity {
    fn similarity(&self, other: &Self) -> f64;
}

impl<T: AsRef<str>> Similarity for T {
    fn similarity(&self, other: &Self) -> f64 {
        similarity(self.as_ref(), other.as_ref())
    }
}

/// Dice coefficient string similarity.
/// Used to pick an output device from a partial name.
/// Bigrams are char pairs, so non-ASCII device names are fine.
pub fn similarity(str1: &str, str2: &str) -> f64 {
    let a = str1.replace(' ', "").chars().collect::<Vec<_>>();
    let b = str2.replace(' ', "").chars().collect::<Vec<_>>();

    if a == b {
        return 1.0;
    }

    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    let mut first_bigrams = HashMap::<(char, char), i32>::new();
    for bigram in a.windows(2) {
        *first_bigrams.entry((bigram[0], bigram[1])).or_insert(0) += 1;
    }

    let mut intersection_size = 0;
    for bigram in b.windows(2) {
        let count = first_bigrams.entry((bigram[0], bigram[1])).or_insert(0);
        if *count > 0 {
            *count -= 1;
            intersection_size += 1;
        }
    }

    (2.0 * intersection_size as f64) / (a.len() + b.len() - 2) as f64
}

#[cfg(test)]
mod test {
    use super::Similarity;

    #[test]
    fn test_similarity() {
        assert_eq!("speakers".similarity(&"speakers"), 1.0);
        assert_eq!("abc".similarity(&"xyz"), 0.0);

        let close = "usb speakers".similarity(&"speakers");
        let far = "usb speakers".similarity(&"microphone");
        assert!(close > far);
    }

    #[test]
    fn test_similarity_non_ascii() {
        // localized device names must not blow up on multi-byte chars
        let score = "Kopfhörer (USB)".similarity(&"speakers");
        assert!((0.0..1.0).contains(&score));

        assert!("écouteurs".similarity(&"ecouteurs") > 0.5);
    }
}
