//! Basic usage example of the memoization cache.

use memo_kit::{
    Args, DataProducer, Error, ManagerConfig, PoolManager, RememberOptions, Result,
};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Example value: Employment
#[derive(Clone, Debug)]
struct Employment {
    id: String,
    employer_name: String,
    salary: f64,
}

/// Mock producer that simulates database access
#[derive(Default)]
struct EmploymentProducer {
    queries: AtomicUsize,
}

impl DataProducer<Employment> for EmploymentProducer {
    fn produce(&self, args: &Args) -> impl Future<Output = Result<Employment>> + Send {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let id = args
            .get(1)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_default();

        async move {
            println!("  [DB] Fetching employment: {}", id);

            // Simulate some employments in the database
            match id.as_str() {
                "emp_001" => Ok(Employment {
                    id,
                    employer_name: "Acme Corp".to_string(),
                    salary: 75000.0,
                }),
                "emp_002" => Ok(Employment {
                    id,
                    employer_name: "Tech Inc".to_string(),
                    salary: 95000.0,
                }),
                _ => Err(Error::ProducerError(format!("employment {} not found", id))),
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== Memo Kit - Basic Example ===\n");

    // 1. Initialize the manager with a background sweeper
    println!("1. Starting pool manager...");
    let manager: PoolManager<Employment> = PoolManager::start(
        ManagerConfig::new().with_sweep_interval(Duration::from_secs(1)),
    )?;
    let pool = manager.add_pool("employments").await;
    let producer = EmploymentProducer::default();
    println!("   ✓ Pool 'employments' ready\n");

    // 2. First request - cache miss, produce from database
    println!("2. First request for employment (emp_001):");
    let args = Args::new().with(1, "emp_001");
    let emp = pool.remember("employment", 5, &args, false, &producer).await?;
    println!(
        "   ✓ Employment loaded: {} from {} (${:.2})\n",
        emp.employer_name, emp.id, emp.salary
    );

    // 3. Second request - cache hit
    println!("3. Second request for same employment (emp_001):");
    let emp = pool.remember("employment", 5, &args, false, &producer).await?;
    println!(
        "   ✓ Employment loaded from cache: {} (${:.2})",
        emp.employer_name, emp.salary
    );
    println!(
        "   ✓ Database queries so far: {}\n",
        producer.queries.load(Ordering::SeqCst)
    );

    // 4. Producer failure - nothing is cached
    println!("4. Request for unknown employment (emp_003):");
    let missing = Args::new().with(1, "emp_003");
    match pool.remember("employment", 5, &missing, false, &producer).await {
        Ok(_) => println!("   ✗ Unexpected hit\n"),
        Err(e) => println!("   ✓ Producer failed, nothing cached: {}\n", e),
    }

    // 5. Forced refresh - bypass the cache read
    println!("5. Forced refresh (emp_002):");
    let args = Args::new().with(1, "emp_002");
    let options = RememberOptions::minutes(5).force();
    let emp = pool
        .remember_with("employment", &args, options, &producer)
        .await?;
    println!(
        "   ✓ Employment refreshed from database: {} (${:.2})\n",
        emp.employer_name, emp.salary
    );

    // 6. Forget - invalidate one entry
    println!("6. Forget emp_002 and request it again:");
    pool.forget("employment", &args).await?;
    pool.remember("employment", 5, &args, false, &producer).await?;
    println!(
        "   ✓ Database queries so far: {}\n",
        producer.queries.load(Ordering::SeqCst)
    );

    // 7. Pool statistics
    let stats = pool.stats().await;
    println!(
        "7. Pool stats: {} entries ({} expired)\n",
        stats.total_entries, stats.expired_entries
    );

    manager.shutdown().await;
    println!("=== Example Complete ===\n");

    Ok(())
}
