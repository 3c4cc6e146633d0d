use std::collections::VecDeque;

/// 上限つきのローリング履歴。満杯になったら最古の要素から捨てる。
#[derive(Debug, Clone)]
pub struct RollingHistory<T> {
    items: VecDeque<T>,
    cap: usize,
}

impl<T> RollingHistory<T> {
    pub fn new(cap: usize) -> Self {
        assert!(cap > 0, "history cap must be positive");
        Self {
            items: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn push(&mut self, item: T) {
        if self.items.len() == self.cap {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// 直近n件（古い順）
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &T> {
        let skip = self.items.len().saturating_sub(n);
        self.items.iter().skip(skip)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_within_cap() {
        let mut h = RollingHistory::new(3);
        h.push(1);
        h.push(2);
        assert_eq!(h.len(), 2);
        assert_eq!(h.latest(), Some(&2));
    }

    #[test]
    fn test_cap_never_exceeded() {
        let mut h = RollingHistory::new(100);
        for i in 0..101 {
            h.push(i);
        }
        // 101st push evicts exactly the oldest entry
        assert_eq!(h.len(), 100);
        assert_eq!(h.iter().next(), Some(&1));
        assert_eq!(h.latest(), Some(&100));
    }

    #[test]
    fn test_recent_takes_newest() {
        let mut h = RollingHistory::new(10);
        for i in 0..10 {
            h.push(i);
        }
        let recent: Vec<_> = h.recent(3).copied().collect();
        assert_eq!(recent, vec![7, 8, 9]);
        // asking for more than stored yields everything
        assert_eq!(h.recent(50).count(), 10);
    }

    #[test]
    fn test_clear() {
        let mut h = RollingHistory::new(4);
        h.push(1.0);
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.latest(), None);
    }
}
