//! HandlerPriority - 실행 단계

use std::fmt;

/// 핸들러 우선순위
///
/// 실행 순서: `Early` → `Normal` → `Late` → `Monitor`.
/// 같은 단계 안에서의 순서는 보장하지 않습니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandlerPriority {
    /// 가장 먼저 실행
    Early,
    /// 기본 단계
    #[default]
    Normal,
    /// Normal 이후 실행
    Late,
    /// 관찰 전용. 원본이 아닌 복사본을 받으며 항상 마지막에 실행
    Monitor,
}

impl HandlerPriority {
    /// dispatch 순서
    pub const ALL: [HandlerPriority; 4] = [Self::Early, Self::Normal, Self::Late, Self::Monitor];

    pub fn is_monitor(&self) -> bool {
        matches!(self, Self::Monitor)
    }

    /// tier 배열 인덱스
    pub(crate) fn index(&self) -> usize {
        match self {
            Self::Early => 0,
            Self::Normal => 1,
            Self::Late => 2,
            Self::Monitor => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Early => "early",
            Self::Normal => "normal",
            Self::Late => "late",
            Self::Monitor => "monitor",
        }
    }
}

impl fmt::Display for HandlerPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_matches_all() {
        let mut sorted = HandlerPriority::ALL;
        sorted.sort();
        assert_eq!(sorted, HandlerPriority::ALL);

        for (i, priority) in HandlerPriority::ALL.iter().enumerate() {
            assert_eq!(priority.index(), i);
        }
    }

    #[test]
    fn test_default_is_normal() {
        assert_eq!(HandlerPriority::default(), HandlerPriority::Normal);
        assert!(HandlerPriority::Monitor.is_monitor());
        assert!(!HandlerPriority::Late.is_monitor());
    }
}
