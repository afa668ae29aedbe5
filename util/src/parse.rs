//! Tiny parser combinators for command-line style values.

use std::str::FromStr;

/// Parse result, the parsed value and the remaining input or the input the
/// parser failed on.
pub type Result<'a, T> = std::result::Result<(T, &'a str), &'a str>;

/// Split a non-empty field from the front of input up to the separator.
///
/// The separator is consumed, surrounding whitespace is trimmed from the
/// field.
pub fn field(input: &str, sep: char) -> Result<&str> {
    let (head, rest) = match input.find(sep) {
        Some(i) => (&input[..i], &input[i + sep.len_utf8()..]),
        None => (input, ""),
    };

    let head = head.trim();
    if head.is_empty() {
        Err(input)
    } else {
        Ok((head, rest))
    }
}

/// Parse a field into a value.
pub fn value<T: FromStr>(input: &str, sep: char) -> Result<T> {
    let (word, rest) = field(input, sep)?;
    match word.parse::<T>() {
        Ok(val) => Ok((val, rest)),
        Err(_) => Err(input),
    }
}

/// Parse every remaining field into a value.
pub fn values<T: FromStr>(mut input: &str, sep: char) -> Result<Vec<T>> {
    let mut ret = Vec::new();
    while !input.trim().is_empty() {
        let (val, rest) = value(input, sep)?;
        ret.push(val);
        input = rest;
    }
    Ok((ret, input))
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    #[test]
    fn fields() {
        assert_eq!(field("a, b", ','), Ok(("a", " b")));
        assert_eq!(field(" b", ','), Ok(("b", "")));
        assert_eq!(field(",b", ','), Err(",b"));
        assert_eq!(field("", ','), Err(""));
    }

    #[test]
    fn numbers() {
        assert_eq!(value::<i32>("12,x", ','), Ok((12, "x")));
        assert_eq!(value::<i32>("x,12", ','), Err("x,12"));
        assert_eq!(values::<f32>("1, 2.5,3", ','), Ok((vec![1.0, 2.5, 3.0], "")));
        assert_eq!(values::<f32>("1,,3", ','), Err(",3"));
    }

    #[quickcheck]
    fn joined_numbers(nums: Vec<i32>) -> bool {
        let text = nums
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        values::<i32>(&text, ',') == Ok((nums, ""))
    }
}
