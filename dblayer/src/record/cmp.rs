use std::cmp::Ordering;

use crate::value::Value;

/// Order by direction.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    /// Applies the direction to an ascending comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Order::Asc => ordering,
            Order::Desc => ordering.reverse(),
        }
    }
}

/// Compares two record values.
///
/// When both values render as clean integers (see [`Value::as_clean_int`]),
/// they are compared numerically. Otherwise their text renderings are compared
/// byte by byte, so `"007"` sorts before `"7"` and `"10"` before `"9x"`.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_clean_int(), b.as_clean_int()) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => a.to_text().as_bytes().cmp(b.to_text().as_bytes()),
    }
}

/// Compares the lower-cased text renderings of two values.
pub fn compare_lexical(a: &Value, b: &Value) -> Ordering {
    a.to_text().to_lowercase().cmp(&b.to_text().to_lowercase())
}

/// Stable merge sort.
///
/// [`compare_values`] is not a total order on mixed data (`"9" < "10"`,
/// `"10" < "1a"`, `"1a" < "9"`), which `slice::sort_by` may panic on. This
/// sort accepts any comparator: the output is always a permutation of the
/// input, and equal items keep their relative order.
pub fn merge_sort_by<T, F>(items: Vec<T>, cmp: &mut F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return items;
    }

    let mut left = items;
    let right = left.split_off(left.len() / 2);
    let left = merge_sort_by(left, cmp);
    let right = merge_sort_by(right, cmp);

    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        match (left.peek(), right.peek()) {
            (Some(a), Some(b)) => {
                // Take from the right only when strictly smaller.
                if cmp(b, a) == Ordering::Less {
                    out.extend(right.next());
                } else {
                    out.extend(left.next());
                }
            }
            (Some(_), None) => {
                out.extend(left);
                break;
            }
            (None, _) => {
                out.extend(right);
                break;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_branch() {
        let cmp = |a: &str, b: &str| compare_values(&a.into(), &b.into());
        assert_eq!(cmp("9", "10"), Ordering::Less);
        assert_eq!(cmp("-2", "1"), Ordering::Less);
        assert_eq!(compare_values(&Value::Int(9), &"10".into()), Ordering::Less);
    }

    #[test]
    fn test_lexicographic_branch() {
        let cmp = |a: &str, b: &str| compare_values(&a.into(), &b.into());
        // "007" isn't a clean integer: the pair falls back to byte order.
        assert_eq!(cmp("007", "7"), Ordering::Less);
        assert_eq!(cmp("9", "10x"), Ordering::Greater);
        assert_eq!(cmp("B", "a"), Ordering::Less);
        assert_eq!(compare_values(&Value::Null, &"a".into()), Ordering::Less);
    }

    #[test]
    fn test_lexical() {
        assert_eq!(compare_lexical(&"B".into(), &"a".into()), Ordering::Greater);
        assert_eq!(compare_lexical(&"abc".into(), &"ABC".into()), Ordering::Equal);
    }

    #[test]
    fn test_order_apply() {
        assert_eq!(Order::Desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(Order::Asc.apply(Ordering::Less), Ordering::Less);
    }

    #[test]
    fn test_merge_sort_is_stable() {
        let items = vec![(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd'), (0, 'e')];
        let sorted = merge_sort_by(items, &mut |a: &(i32, char), b: &(i32, char)| a.0.cmp(&b.0));
        assert_eq!(sorted, [(0, 'e'), (1, 'b'), (1, 'd'), (2, 'a'), (2, 'c')]);
    }

    #[test]
    fn test_merge_sort_inconsistent_order() {
        let mut values: Vec<Value> = Vec::new();
        for i in 0..300 {
            values.push(Value::from(i.to_string()));
            values.push(Value::from(format!("{i}a")));
            values.push(Value::Int(1000 - i));
        }
        let mut expected: Vec<_> = values.iter().map(|v| v.to_text().into_owned()).collect();

        let sorted = merge_sort_by(values, &mut compare_values);
        let mut got: Vec<_> = sorted.iter().map(|v| v.to_text().into_owned()).collect();
        expected.sort();
        got.sort();
        assert_eq!(got, expected);
    }
}
