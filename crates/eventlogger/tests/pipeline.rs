use std::sync::Arc;
use std::time::Duration;

use cellcentre_auth::IdentityClaims;
use cellcentre_employees::EmployeeFilter;
use cellcentre_eventlogger::{Config, start};
use cellcentre_events::{EventBus, EventFactory, EventType, InMemoryBroker, InMemoryConnector};
use cellcentre_infra::InMemoryEventLog;

fn config(client_id: &str) -> Config {
    Config {
        database_url: "unused".to_string(),
        nats_cluster_id: "cell-centre".to_string(),
        nats_url: "mem://".to_string(),
        nats_client_id: client_id.to_string(),
        subscribes: vec!["employees".to_string()],
    }
}

async fn wait_for(log: &InMemoryEventLog, n: usize) {
    for _ in 0..100 {
        if log.all().len() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn logger_resumes_after_restart_under_same_durable() {
    let broker = Arc::new(InMemoryBroker::new());
    let connector = Arc::new(InMemoryConnector::new(broker));
    let log = Arc::new(InMemoryEventLog::new());

    let publisher = EventBus::new(connector.clone());
    publisher.connect("cell-centre", "mem://").await.unwrap();
    let factory = EventFactory::employees();
    let claims = admin_claims();

    let subs = start(&config("logger-a"), connector.clone(), log.clone()).await.unwrap();
    publisher
        .publish(&factory.delete_entity(&claims, &filter("one@page.com")).unwrap())
        .await
        .unwrap();
    wait_for(&log, 1).await;
    for s in subs {
        s.close().await;
    }

    publisher
        .publish(&factory.delete_entity(&claims, &filter("two@page.com")).unwrap())
        .await
        .unwrap();

    let subs = start(&config("logger-a"), connector, log.clone()).await.unwrap();
    wait_for(&log, 2).await;
    for s in subs {
        s.close().await;
    }

    let records = log.all();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.event_type == EventType::DeleteEntity));
    assert_eq!(records[1].aggregate_id, "two@page.com");
}

fn filter(email: &str) -> EmployeeFilter {
    EmployeeFilter::by_email(email)
}

fn admin_claims() -> IdentityClaims {
    IdentityClaims {
        entity: "employee".into(),
        login: "admin@page.com".into(),
        ..Default::default()
    }
}
