use anyhow::Result;
use std::io::{self, BufRead, Write};

/// Print `prompt` and read one line. Returns `None` at end of input;
/// otherwise the line without its trailing newline. Bytes that are not
/// UTF-8 are replaced rather than failing the read.
pub fn read_line<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> Result<Option<String>> {
    write!(output, "{}", prompt)?;
    output.flush()?;

    let mut buf = Vec::new();
    if input.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }

    let line = String::from_utf8_lossy(&buf);
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

/// Ask a yes/no question; anything but an explicit yes (including end of
/// input) counts as no.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> Result<bool> {
    loop {
        let Some(answer) = read_line(input, output, &format!("{} [y/N]: ", prompt))? else {
            return Ok(false);
        };
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" | "" => return Ok(false),
            _ => writeln!(output, "Please enter 'y' or 'n'")?,
        }
    }
}

pub fn prompt_yes_no(prompt: &str) -> Result<bool> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    confirm(&mut stdin.lock(), &mut stdout, prompt)
}
