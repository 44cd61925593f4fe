mod browser;
mod chromedriver;
mod command;
mod webdriver;

pub use browser::Browser;
pub use chromedriver::Chromedriver;
pub use command::CHROMEDRIVER;
pub use webdriver::WebDriver;
