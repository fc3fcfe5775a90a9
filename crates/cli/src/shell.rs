//! Interactive shop.
//!
//! A single task owns the [`Storefront`] and handles one event at a time:
//! either a line of input or a completed page fetch. Page fetches run on
//! spawned tasks and report back over a channel, so the shell stays
//! responsive while the catalog loads.

use std::io::Write;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use dummymart_core::ProductId;
use dummymart_storefront::api::{ApiError, Product};
use dummymart_storefront::cart::clamp_quantity;
use dummymart_storefront::catalog::{
    CatalogSource, FetchOutcome, FilterCriteria, KNOWN_CATEGORIES, Page, PageTicket,
};
use dummymart_storefront::error::{AppError, Result};
use dummymart_storefront::forms::{ContactForm, LoginForm, SignupForm};
use dummymart_storefront::state::Storefront;

use crate::command::{self, Command, HELP};
use crate::render;

type FetchResult = (PageTicket, std::result::Result<Page, ApiError>);

struct Shell {
    store: Storefront,
    fetches: mpsc::UnboundedSender<FetchResult>,
}

/// Run the shop until `quit` or end of input.
///
/// # Errors
///
/// Returns an error only if stdin cannot be read; command failures are
/// reported inline.
pub async fn run(store: Storefront) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut shell = Shell { store, fetches: tx };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    shell.greet();
    shell.refill();
    prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = line.map_err(|e| AppError::Internal(format!("stdin: {e}")))?;
                let Some(line) = line else { break };
                match command::parse(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => shell.execute(command).await,
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                }
                prompt();
            }
            Some((ticket, result)) = rx.recv() => shell.page_arrived(ticket, result),
        }
    }

    println!("Bye!");
    Ok(())
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

impl Shell {
    fn greet(&self) {
        println!("Welcome to DummyMart. Type 'help' for commands.");
        if let Some(session) = self.store.session() {
            println!("Logged in as {}.", session.display_name());
        }
    }

    async fn execute(&mut self, command: Command) {
        if let Err(e) = self.dispatch(command).await {
            e.report();
            println!("{}", e.notice());
        }
    }

    async fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Help => println!("{HELP}"),
            Command::List => self.list(),
            Command::Scroll => self.scroll(),
            Command::Search(text) => {
                let criteria = self.criteria().with_search(text);
                self.apply_criteria(criteria);
            }
            Command::Category(None) => println!("{}", KNOWN_CATEGORIES.join(", ")),
            Command::Category(Some(name)) => {
                let criteria = self.criteria().with_category_toggled(&name);
                self.apply_criteria(criteria);
            }
            Command::Price(range) => {
                let criteria = self.criteria().with_price_range(range);
                self.apply_criteria(criteria);
            }
            Command::Sort(key) => {
                let criteria = self.criteria().with_sort(key);
                self.apply_criteria(criteria);
            }
            Command::Reset => self.apply_criteria(FilterCriteria::default()),
            Command::Show(id) => {
                let product = self.store.product(id).await?;
                let related = self.store.related(&product).await?;
                println!("{}", render::product_details(&product, &related));
            }
            Command::Add { id, quantity } => {
                let product = self.find_product(id).await?;
                let current = i64::from(self.store.cart().quantity_of(id));
                let next = clamp_quantity(&product, current.saturating_add(quantity));
                self.store.set_cart_quantity(&product, next)?;
                self.cart_updated(&product, next);
            }
            Command::Qty { id, quantity } => {
                let product = self.find_product(id).await?;
                let next = clamp_quantity(&product, quantity);
                self.store.set_cart_quantity(&product, next)?;
                self.cart_updated(&product, next);
            }
            Command::Inc(id) => {
                let product = self.find_product(id).await?;
                let next = self.store.increment(&product)?;
                self.cart_updated(&product, next);
            }
            Command::Dec(id) => {
                let product = self.find_product(id).await?;
                let next = self.store.decrement(&product)?;
                self.cart_updated(&product, next);
            }
            Command::Remove(id) => {
                if self.store.remove_from_cart(id)? {
                    println!("Removed.");
                } else {
                    println!("That product is not in your cart.");
                }
            }
            Command::Cart => println!("{}", render::cart(self.store.cart())),
            Command::Clear => {
                self.store.clear_cart()?;
                println!("Cart emptied.");
            }
            Command::Login { username, password } => {
                let session = self
                    .store
                    .login(&LoginForm::new(username, password))
                    .await?;
                println!("Welcome back, {}!", session.display_name());
            }
            Command::Logout => {
                self.store.logout()?;
                println!("Logged out.");
            }
            Command::Signup {
                username,
                email,
                password,
            } => {
                self.store
                    .signup(&SignupForm {
                        username,
                        email,
                        password,
                    })
                    .await?;
                println!("Sign up successful. You can now log in.");
            }
            Command::Contact {
                name,
                email,
                message,
            } => {
                self.store
                    .submit_contact(&ContactForm {
                        name,
                        email,
                        message,
                    })
                    .await?;
                println!("{}", render::CONTACT_SENT);
            }
            Command::Theme => {
                let theme = self.store.toggle_theme()?;
                println!("Theme: {theme}");
            }
            Command::WhoAmI => match self.store.session() {
                Some(session) => println!("{}", render::session(session, Utc::now())),
                None => println!("Not logged in."),
            },
            Command::Quit => {}
        }
        Ok(())
    }

    fn criteria(&self) -> FilterCriteria {
        self.store.pager().criteria().clone()
    }

    fn apply_criteria(&mut self, criteria: FilterCriteria) {
        if self.store.set_criteria(criteria) {
            self.refill();
        }
        self.list();
    }

    fn list(&self) {
        let products = self.store.visible_products();
        println!("{}", render::product_list(&products));
        if self.store.pager().is_fetching() {
            println!("Loading more...");
        } else if self.store.pager().has_more() {
            println!("Type 'scroll' for more.");
        }
    }

    fn scroll(&mut self) {
        match self.store.on_scroll(0) {
            Some(ticket) => {
                self.spawn_fetch(ticket);
                println!("Loading more...");
            }
            None if self.store.pager().is_fetching() => println!("Already loading..."),
            None => println!("No more products."),
        }
    }

    /// Keep fetching while fewer than a page of products is visible.
    fn refill(&mut self) {
        if let Some(ticket) = self.store.fill_ticket() {
            self.spawn_fetch(ticket);
        }
    }

    fn spawn_fetch(&self, ticket: PageTicket) {
        let api = self.store.api().clone();
        let tx = self.fetches.clone();
        tokio::spawn(async move {
            let result = api.fetch_page(ticket.limit(), ticket.offset()).await;
            // The receiver only goes away at shutdown.
            let _ = tx.send((ticket, result));
        });
    }

    fn page_arrived(&mut self, ticket: PageTicket, result: std::result::Result<Page, ApiError>) {
        match self.store.complete_fetch(ticket, result) {
            Ok(FetchOutcome::Applied { added }) => {
                debug!(added, "page applied");
                self.refill();
            }
            Ok(FetchOutcome::Stale) => self.refill(),
            Err(e) => {
                e.report();
                println!("\n{}", e.notice());
                prompt();
            }
        }
    }

    /// Look up a product in the cart, then among fetched pages, then
    /// remotely.
    async fn find_product(&self, id: ProductId) -> Result<Product> {
        if let Some(line) = self.store.cart().line(id) {
            return Ok(line.product.clone());
        }
        if let Some(product) = self.store.pager().items().find(|p| p.id == id) {
            return Ok(product.clone());
        }
        self.store.product(id).await
    }

    fn cart_updated(&self, product: &Product, quantity: u32) {
        if quantity == 0 {
            println!("{} removed from cart.", product.title);
        } else if quantity == product.stock {
            println!(
                "{} x {} in cart (all available stock).",
                quantity, product.title
            );
        } else {
            println!("{} x {} in cart.", quantity, product.title);
        }
        println!("Cart: {} item(s)", self.store.cart().total_quantity());
    }
}
