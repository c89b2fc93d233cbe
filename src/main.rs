use chrono::Local;
use helpcenter_qna::{
    info_time,
    process::{download_qnas_from_sheets, update_sheets_with_qnas},
    request::WebDriverLauncher,
    sheets::GoogleSheets,
    Result, Settings,
};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

const DIVIDER: &str =
    "-----------------------------------------------------------------------------";
const MENU: &str = "> Which function would you like me to run for you? Enter its number below
                1 : Update Google Sheets with all Q&As in the Help Center
                2 : Download all Q&As from Google Sheets
> ";

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load()?;
    let launcher = WebDriverLauncher::new(&settings.webdriver_url, settings.headless)?;
    let spreadsheet =
        GoogleSheets::new(&settings.sheets_api_url, settings.sheets_token.as_str())?
            .open(&settings.spreadsheet_id);

    println!("> Hi! I'm the Help Center Q&A Helper.");

    let mut stdout = io::stdout();
    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        stdout
            .write_all(format!("{DIVIDER}\n{MENU}").as_bytes())
            .await?;
        stdout.flush().await?;

        let Some(choice) = lines.next_line().await? else {
            return Ok(());
        };

        let start_time = Local::now();
        match choice.trim() {
            "1" => {
                let pairs = update_sheets_with_qnas(&launcher, &spreadsheet, &settings).await?;
                info_time!(start_time, "Updated Google Sheets with {} Q&As.", pairs.len());
            }
            "2" => {
                let path = download_qnas_from_sheets(&spreadsheet, &settings).await?;
                info_time!(start_time, "Saved all Q&As to {}", path.display());
            }
            _ => println!(
                "> ERROR: Please enter a number corresponding to one of the available functions"
            ),
        }
    }
}
