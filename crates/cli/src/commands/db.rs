use anyhow::Context;
use monarch_orm::SchemaBuilder;
use std::time::Instant;

use super::Settings;

/// Round-trip to the configured database
pub async fn ping(settings: &Settings) -> anyhow::Result<()> {
    let mut conn = settings.connect().await?;
    let latency = conn.ping().await.context("Ping failed")?;
    conn.close().await?;

    println!("Database is reachable ({:?}).", latency);
    Ok(())
}

/// CREATE DATABASE owned by the configured user
pub async fn create(settings: &Settings) -> anyhow::Result<()> {
    let name = settings.config.database_name()?;
    let sql = SchemaBuilder::new()
        .create_database(&name, Some(settings.config.user.as_str()))
        .build();

    let elapsed = execute_on_server(settings, &sql)
        .await
        .with_context(|| format!("Failed to create database {:?}", name))?;

    println!("Database {:?} created. Command completed in {:?}.", name, elapsed);
    Ok(())
}

pub async fn drop(settings: &Settings) -> anyhow::Result<()> {
    let name = settings.config.database_name()?;
    let sql = SchemaBuilder::new().drop_database(&name).build();

    let elapsed = execute_on_server(settings, &sql)
        .await
        .with_context(|| format!("Failed to drop database {:?}", name))?;

    println!("Database {:?} dropped. Command completed in {:?}.", name, elapsed);
    Ok(())
}

pub async fn reset(settings: &Settings) -> anyhow::Result<()> {
    drop(settings).await?;
    create(settings).await
}

async fn execute_on_server(settings: &Settings, sql: &str) -> anyhow::Result<std::time::Duration> {
    let mut conn = settings.connect_server().await?;

    tracing::debug!("Executing: {}", sql);
    let start = Instant::now();
    let outcome = conn.execute(sql, &[]).await;
    let elapsed = start.elapsed();
    conn.close().await?;

    outcome?;
    Ok(elapsed)
}
