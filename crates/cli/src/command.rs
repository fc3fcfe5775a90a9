//! Shell command parsing.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use dummymart_core::ProductId;
use dummymart_storefront::catalog::{PriceRange, SortKey};

/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Show the displayed products.
    List,
    /// Jump to the bottom of the list, loading the next page.
    Scroll,
    /// Set the title search; empty clears it.
    Search(String),
    /// Toggle a category filter; `None` lists the categories.
    Category(Option<String>),
    /// Set the inclusive price range; `None` clears it.
    Price(Option<PriceRange>),
    /// Set the ordering; `None` restores fetch order.
    Sort(Option<SortKey>),
    /// Clear every filter and the sort.
    Reset,
    Show(ProductId),
    /// Add units to the cart.
    Add { id: ProductId, quantity: i64 },
    /// Set the quantity of a cart line.
    Qty { id: ProductId, quantity: i64 },
    Inc(ProductId),
    Dec(ProductId),
    Remove(ProductId),
    Cart,
    Clear,
    Login { username: String, password: String },
    Logout,
    Signup {
        username: String,
        email: String,
        password: String,
    },
    Contact {
        name: String,
        email: String,
        message: String,
    },
    Theme,
    WhoAmI,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown command '{0}'. Type 'help' for a list of commands.")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("{0}")]
    Invalid(String),
}

pub const HELP: &str = "\
Catalog
  list                        show products
  scroll                      load more products
  search [text]               filter by title (no text clears)
  category [name]             toggle a category (no name lists them)
  price [min max]             filter by price (no bounds clears)
  sort [key]                  price-asc, price-desc, rating-asc, rating-desc
  reset                       clear filters and sort
  show <id>                   product details
Cart
  add <id> [n]                add n units (default 1)
  qty <id> <n>                set quantity (0 removes)
  inc <id> / dec <id>         change quantity by one
  remove <id>                 remove a line
  cart                        show the cart
  clear                       empty the cart
Account
  login <username> <password>
  logout
  signup <username> <email> <password>
  whoami
Other
  contact <name> | <email> | <message>
  theme                       toggle light/dark
  help
  quit";

/// Parse one input line. Blank lines yield `None`.
///
/// # Errors
///
/// Returns a usage message for unknown commands or bad arguments.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match name.to_ascii_lowercase().as_str() {
        "" => return Ok(None),
        "help" | "?" => Command::Help,
        "list" | "ls" => Command::List,
        "scroll" | "more" => Command::Scroll,
        "search" => Command::Search(rest.to_string()),
        "category" | "cat" => Command::Category((!rest.is_empty()).then(|| rest.to_lowercase())),
        "price" => match args.as_slice() {
            [] => Command::Price(None),
            [min, max] => Command::Price(Some(
                PriceRange::new(number(min)?, number(max)?)
                    .map_err(|e| ParseError::Invalid(e.to_string()))?,
            )),
            _ => return Err(ParseError::Usage("price [min max]")),
        },
        "sort" => match args.as_slice() {
            [] => Command::Sort(None),
            [key] => Command::Sort(Some(
                key.parse()
                    .map_err(|e: <SortKey as FromStr>::Err| ParseError::Invalid(e.to_string()))?,
            )),
            _ => return Err(ParseError::Usage("sort [key]")),
        },
        "reset" => Command::Reset,
        "show" => Command::Show(single_id(&args, "show <id>")?),
        "add" => match args.as_slice() {
            [id] => Command::Add {
                id: product_id(id)?,
                quantity: 1,
            },
            [id, n] => Command::Add {
                id: product_id(id)?,
                quantity: integer(n)?,
            },
            _ => return Err(ParseError::Usage("add <id> [n]")),
        },
        "qty" => match args.as_slice() {
            [id, n] => Command::Qty {
                id: product_id(id)?,
                quantity: integer(n)?,
            },
            _ => return Err(ParseError::Usage("qty <id> <n>")),
        },
        "inc" => Command::Inc(single_id(&args, "inc <id>")?),
        "dec" => Command::Dec(single_id(&args, "dec <id>")?),
        "remove" | "rm" => Command::Remove(single_id(&args, "remove <id>")?),
        "cart" => Command::Cart,
        "clear" => Command::Clear,
        "login" => match args.as_slice() {
            [username, password] => Command::Login {
                username: (*username).to_string(),
                password: (*password).to_string(),
            },
            _ => return Err(ParseError::Usage("login <username> <password>")),
        },
        "logout" => Command::Logout,
        "signup" => match args.as_slice() {
            [username, email, password] => Command::Signup {
                username: (*username).to_string(),
                email: (*email).to_string(),
                password: (*password).to_string(),
            },
            _ => return Err(ParseError::Usage("signup <username> <email> <password>")),
        },
        "contact" => {
            let parts: Vec<&str> = rest.splitn(3, '|').map(str::trim).collect();
            match parts.as_slice() {
                [name, email, message] => Command::Contact {
                    name: (*name).to_string(),
                    email: (*email).to_string(),
                    message: (*message).to_string(),
                },
                _ => return Err(ParseError::Usage("contact <name> | <email> | <message>")),
            }
        }
        "theme" => Command::Theme,
        "whoami" => Command::WhoAmI,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };

    Ok(Some(command))
}

fn single_id(args: &[&str], usage: &'static str) -> Result<ProductId, ParseError> {
    match args {
        [id] => product_id(id),
        _ => Err(ParseError::Usage(usage)),
    }
}

fn product_id(raw: &str) -> Result<ProductId, ParseError> {
    raw.parse()
        .map_err(|_| ParseError::Invalid(format!("'{raw}' is not a product ID")))
}

fn integer(raw: &str) -> Result<i64, ParseError> {
    raw.parse()
        .map_err(|_| ParseError::Invalid(format!("'{raw}' is not a whole number")))
}

fn number(raw: &str) -> Result<Decimal, ParseError> {
    raw.parse()
        .map_err(|_| ParseError::Invalid(format!("'{raw}' is not a number")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line() {
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn test_catalog_commands() {
        assert_eq!(
            parse("search  red lipstick ").unwrap(),
            Some(Command::Search("red lipstick".to_string()))
        );
        assert_eq!(parse("search").unwrap(), Some(Command::Search(String::new())));
        assert_eq!(
            parse("category Beauty").unwrap(),
            Some(Command::Category(Some("beauty".to_string())))
        );
        assert_eq!(
            parse("price 5 19.99").unwrap(),
            Some(Command::Price(Some(
                PriceRange::new(Decimal::new(5, 0), Decimal::new(1999, 2)).unwrap()
            )))
        );
        assert!(matches!(parse("price 20 5"), Err(ParseError::Invalid(_))));
        assert_eq!(
            parse("sort rating-desc").unwrap(),
            Some(Command::Sort(Some(SortKey::RatingDesc)))
        );
    }

    #[test]
    fn test_cart_commands() {
        assert_eq!(
            parse("add 7").unwrap(),
            Some(Command::Add {
                id: ProductId::new(7),
                quantity: 1
            })
        );
        assert_eq!(
            parse("qty 7 0").unwrap(),
            Some(Command::Qty {
                id: ProductId::new(7),
                quantity: 0
            })
        );
        assert_eq!(parse("rm 3").unwrap(), Some(Command::Remove(ProductId::new(3))));
    }

    #[test]
    fn test_contact_splits_on_pipes() {
        assert_eq!(
            parse("contact Jane Doe | jane@example.com | Where is my order? | thanks").unwrap(),
            Some(Command::Contact {
                name: "Jane Doe".to_string(),
                email: "jane@example.com".to_string(),
                message: "Where is my order? | thanks".to_string(),
            })
        );
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse("dance"), Err(ParseError::Unknown(_))));
        assert!(matches!(parse("qty 7"), Err(ParseError::Usage(_))));
        assert!(matches!(parse("show abc"), Err(ParseError::Invalid(_))));
        assert!(matches!(parse("sort cheapest"), Err(ParseError::Invalid(_))));
        assert!(matches!(parse("login emilys"), Err(ParseError::Usage(_))));
    }
}
