use std::collections::BTreeSet;

/// Constant pool placed right after the code.
///
/// Values are kept once each, in unsigned order, so a literal's address
/// is the pool start plus its rank.
#[derive(Debug, Default)]
pub struct LiteralTable {
    values: BTreeSet<u16>,
    start: Option<u16>,
}

impl LiteralTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, value: i16) {
        self.values.insert(value as u16);
    }

    pub fn fix_start(&mut self, start: u16) {
        self.start = Some(start);
    }

    pub fn start(&self) -> Option<u16> {
        self.start
    }

    /// Address of an interned value once the pool is placed.
    pub fn locate(&self, value: i16) -> Option<u16> {
        let value = value as u16;
        let start = self.start?;
        if !self.values.contains(&value) {
            return None;
        }
        let rank = self.values.range(..value).count() as u16;
        Some(start.wrapping_add(rank))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in pool order.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.values.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup() {
        let mut pool = LiteralTable::new();
        for v in [5, 5, 7, 5] {
            pool.intern(v);
        }
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn unplaced() {
        let mut pool = LiteralTable::new();
        pool.intern(1);
        assert_eq!(pool.locate(1), None);
        pool.fix_start(0x10);
        assert_eq!(pool.locate(2), None);
    }

    macro_rules! test_locate {
        ($($name:ident: $values:expr, $start:expr => [$(($v:expr, $addr:expr)),*],)*) => {
            $(
                #[test]
                fn $name() {
                    let mut pool = LiteralTable::new();
                    for v in $values {
                        pool.intern(v);
                    }
                    pool.fix_start($start);
                    $(assert_eq!(pool.locate($v), Some($addr));)*
                }
            )*
        }
    }

    test_locate! {
        locate_ascending: [9, 3, 5], 0x3010 => [(3, 0x3010), (5, 0x3011), (9, 0x3012)],
        locate_negative_last: [-1, 0, 0x7FFF], 0 => [(0, 0), (0x7FFF, 1), (-1, 2)],
        locate_wraps: [1, 2], 0xFFFF => [(1, 0xFFFF), (2, 0)],
    }

    #[test]
    fn pool_order() {
        let mut pool = LiteralTable::new();
        for v in [-2, 4, 1] {
            pool.intern(v);
        }
        assert_eq!(pool.iter().collect::<Vec<_>>(), vec![1, 4, 0xFFFE]);
    }
}
