use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use bookstore_api::{
    config::AppConfig,
    db::{OrmConn, create_orm_conn, run_migrations},
    entity::{
        books::{ActiveModel as BookActive, Column as BookCol, Entity as Books},
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories},
        sea_orm_active_enums::Role,
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_admin(&orm, "admin", "admin@bookstore.com", "admin123").await?;
    seed_catalog(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn ensure_admin(
    orm: &OrmConn,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<i32> {
    if let Some(existing) = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
    {
        println!("Admin {email} already exists");
        return Ok(existing.id);
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let admin = UserActive {
        id: NotSet,
        username: Set(username.to_owned()),
        email: Set(email.to_owned()),
        password_hash: Set(password_hash),
        role: Set(Role::Admin),
        created_date: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;

    println!("Created admin {email}");
    Ok(admin.id)
}

async fn seed_catalog(orm: &OrmConn) -> anyhow::Result<()> {
    let categories = [
        ("Roman", "Roman türü kitaplar"),
        ("Bilim Kurgu", "Bilim kurgu türü kitaplar"),
        ("Tarih", "Tarih türü kitaplar"),
        ("Bilim", "Bilim türü kitaplar"),
    ];

    let mut category_ids = Vec::with_capacity(categories.len());
    for (name, description) in categories {
        let id = match Categories::find()
            .filter(CategoryCol::Name.eq(name))
            .one(orm)
            .await?
        {
            Some(existing) => existing.id,
            None => {
                CategoryActive {
                    id: NotSet,
                    name: Set(name.to_owned()),
                    description: Set(Some(description.to_owned())),
                    image_url: Set(None),
                }
                .insert(orm)
                .await?
                .id
            }
        };
        category_ids.push(id);
    }

    let seed_date = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| anyhow::anyhow!("invalid seed date"))?;

    let books = [
        (
            "Suç ve Ceza",
            "Fyodor Dostoyevski",
            "Klasik Rus edebiyatının başyapıtlarından",
            Decimal::new(4500, 2),
            category_ids[0],
        ),
        (
            "1984",
            "George Orwell",
            "Distopik roman",
            Decimal::new(3500, 2),
            category_ids[1],
        ),
        (
            "Osmanlı Tarihi",
            "Halil İnalcık",
            "Osmanlı İmparatorluğu tarihi",
            Decimal::new(6000, 2),
            category_ids[2],
        ),
    ];

    for (title, author, description, price, category_id) in books {
        let exists = Books::find()
            .filter(BookCol::Title.eq(title))
            .filter(BookCol::Author.eq(author))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        BookActive {
            id: NotSet,
            title: Set(title.to_owned()),
            author: Set(author.to_owned()),
            description: Set(Some(description.to_owned())),
            price: Set(price),
            category_id: Set(category_id),
            image_url: Set(None),
            created_date: Set(seed_date.into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}
