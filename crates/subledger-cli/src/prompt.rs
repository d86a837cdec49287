use chrono::NaiveDate;
use color_eyre::eyre::{Result, eyre};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::str::FromStr;

pub fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Err(eyre!("standard input closed"));
    }
    Ok(input.trim().to_string())
}

/// Prompt showing `default`; an empty answer keeps it.
pub fn with_default(label: &str, default: &str) -> Result<String> {
    let answer = if default.is_empty() {
        read_line(&format!("{}: ", label))?
    } else {
        read_line(&format!("{} [{}]: ", label, default.dimmed()))?
    };
    Ok(if answer.is_empty() {
        default.to_string()
    } else {
        answer
    })
}

pub fn required(label: &str) -> Result<String> {
    loop {
        let answer = read_line(&format!("{}: ", label))?;
        if !answer.is_empty() {
            return Ok(answer);
        }
        println!("{}", "A value is required".yellow());
    }
}

pub fn optional(label: &str) -> Result<Option<String>> {
    let answer = read_line(&format!("{} (optional): ", label))?;
    Ok((!answer.is_empty()).then_some(answer))
}

pub fn confirm(label: &str, default: bool) -> Result<bool> {
    let hint = if default { "Y/n" } else { "y/N" };
    loop {
        let answer = read_line(&format!("{} [{}]: ", label, hint))?;
        match answer.to_lowercase().as_str() {
            "" => return Ok(default),
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => println!("{}", "Please answer y or n".yellow()),
        }
    }
}

/// Ask until the answer parses as `T`. With a default, an empty answer
/// returns it.
pub fn parsed<T>(label: &str, default: Option<T>) -> Result<T>
where
    T: FromStr + ToString,
{
    let shown = default.as_ref().map(ToString::to_string);
    loop {
        let answer = match &shown {
            Some(d) => read_line(&format!("{} [{}]: ", label, d.dimmed()))?,
            None => read_line(&format!("{}: ", label))?,
        };

        if answer.is_empty() {
            if let Some(d) = &shown {
                if let Ok(value) = d.parse() {
                    return Ok(value);
                }
            }
        }

        match answer.parse() {
            Ok(value) => return Ok(value),
            Err(_) => println!("{}", format!("`{}` is not valid here", answer).yellow()),
        }
    }
}

pub fn date(label: &str, default: NaiveDate) -> Result<NaiveDate> {
    loop {
        let answer = with_default(&format!("{} (YYYY-MM-DD)", label), &default.to_string())?;
        match NaiveDate::parse_from_str(&answer, "%Y-%m-%d") {
            Ok(date) => return Ok(date),
            Err(_) => println!("{}", format!("`{}` is not a date", answer).yellow()),
        }
    }
}

/// Numbered pick from `options`; an empty answer cancels.
pub fn choose<S: AsRef<str>>(label: &str, options: &[S]) -> Result<Option<usize>> {
    if options.is_empty() {
        return Ok(None);
    }

    for (i, option) in options.iter().enumerate() {
        println!("  {}. {}", i + 1, option.as_ref());
    }

    loop {
        let answer = read_line(&format!("{} (1-{}, empty to cancel): ", label, options.len()))?;
        if answer.is_empty() {
            return Ok(None);
        }
        match answer.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return Ok(Some(n - 1)),
            _ => println!("{}", "Pick one of the numbers above".yellow()),
        }
    }
}
