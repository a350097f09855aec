//! # 交互确认
//!
//! 在终端上询问 `[Y/n]`，空回答视为同意。
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 使用
//! - 使用 `console` crate 读取终端输入

use crate::error::{PixbatchError, Result};

use colored::Colorize;
use console::Term;

/// 解析回答：`Some(true)` 同意，`Some(false)` 拒绝，`None` 无法识别
pub fn parse_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" | "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// 询问是否继续，直到得到可识别的回答
pub fn confirm(question: &str) -> Result<bool> {
    let term = Term::stdout();
    loop {
        term.write_str(&format!("{} {} ", question, "[Y/n]".bold()))
            .map_err(prompt_error)?;
        let answer = term.read_line().map_err(prompt_error)?;
        match parse_answer(&answer) {
            Some(decision) => return Ok(decision),
            None => term
                .write_line("Please answer 'y' or 'n'.")
                .map_err(prompt_error)?,
        }
    }
}

fn prompt_error(e: std::io::Error) -> PixbatchError {
    PixbatchError::Other(format!("failed to read confirmation: {}", e))
}
