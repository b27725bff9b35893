//! 擲骰系統
//!
//! 引擎本身不擲骰：HP 成長只接受外部給的擲骰結果或平均值。
//! 這裡提供骰子表示法、平均值與一個注入亂數來源的擲骰輔助，供宿主程式使用。

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 骰子表示法，例如 `2d6+3`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    /// 骰子數量
    pub count: u32,
    /// 骰子面數
    pub sides: u32,
    /// 要加到擲骰的調整值
    #[serde(default)]
    pub modifier: i32,
}

/// 擲骰結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolledDice {
    pub dice: DiceRoll,
    /// 個別骰子的結果
    pub rolls: Vec<u32>,
    /// 總計（包含調整值）
    pub total: i32,
}

impl DiceRoll {
    pub fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self {
            count,
            sides,
            modifier,
        }
    }

    /// 平均值（無條件捨去）
    pub fn average(&self) -> i32 {
        (self.count * (self.sides + 1) / 2) as i32 + self.modifier
    }

    pub fn minimum(&self) -> i32 {
        self.count as i32 + self.modifier
    }

    pub fn maximum(&self) -> i32 {
        (self.count * self.sides) as i32 + self.modifier
    }

    /// 使用呼叫端提供的亂數來源擲骰
    pub fn roll_with<R: Rng>(&self, rng: &mut R) -> RolledDice {
        let rolls: Vec<u32> = (0..self.count)
            .map(|_| rng.random_range(1..=self.sides.max(1)))
            .collect();
        let sum: u32 = rolls.iter().sum();
        RolledDice {
            dice: *self,
            rolls,
            total: sum as i32 + self.modifier,
        }
    }
}

impl fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{}", m),
            m => write!(f, "{}", m),
        }
    }
}

/// 骰子表示法解析錯誤
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("無效的骰子表示法: {0}")]
pub struct ParseDiceError(pub String);

impl FromStr for DiceRoll {
    type Err = ParseDiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseDiceError(s.to_string());
        let text = s.trim().to_ascii_lowercase();
        let (count, rest) = text.split_once('d').ok_or_else(invalid)?;
        let count = if count.is_empty() {
            1
        } else {
            count.parse().map_err(|_| invalid())?
        };
        let (sides, modifier) = match rest.find(['+', '-']) {
            Some(pos) => {
                let modifier: i32 = rest[pos..]
                    .trim_start_matches('+')
                    .parse()
                    .map_err(|_| invalid())?;
                (&rest[..pos], modifier)
            }
            None => (rest, 0),
        };
        let sides: u32 = sides.parse().map_err(|_| invalid())?;
        if sides == 0 {
            return Err(invalid());
        }
        Ok(Self::new(count, sides, modifier))
    }
}

/// 每級平均生命值成長：ceil(生命骰 / 2) + 1
pub fn average_hp_gain(hit_die: u32) -> i32 {
    hit_die.div_ceil(2) as i32 + 1
}
