use std::io::{self, BufRead, Write};

/// Ask a yes/no question on stdin; anything but `y`/`yes` declines.
pub fn confirm(question: &str) -> bool {
    print!("{question} (y/n): ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    is_yes(&answer)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
