use bistro_http::{FetchClient, Pagination, RequestOptions, Sort, SortOrder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct Dish {
    name: String,
    price_cents: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewOrder<'a> {
    dish: &'a str,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct Order {
    id: u64,
    status: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let api = FetchClient::from_env().map_err(anyhow::Error::msg)?;

    let options = Pagination::default().apply(RequestOptions::new());
    let options = Sort::by("price", SortOrder::Asc).apply(options);
    let menu: Vec<Dish> = api.get("/menu", options).await?;
    for dish in &menu {
        println!("{:<30} {:>6.2}", dish.name, f64::from(dish.price_cents) / 100.0);
    }

    let Some(first) = menu.first() else {
        return Ok(());
    };
    let order: Order = api
        .post(
            "/orders",
            &NewOrder {
                dish: &first.name,
                quantity: 1,
            },
            (),
        )
        .await?;
    println!("order {} is {}", order.id, order.status);

    Ok(())
}
