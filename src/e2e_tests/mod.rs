//! Runs against a live store, e.g. `npx json-server db.json --port 3001`.

#[cfg(test)]
mod tests {

    use std::collections::HashSet;

    use rand::distributions::Alphanumeric;
    use rand::{thread_rng, Rng};
    use url::Url;

    use crate::config::DEFAULT_STORE_URL;
    use crate::store::{HttpTaskStore, TaskStore};
    use crate::TaskSyncClient;

    fn random_title() -> String {
        thread_rng()
            .sample_iter(&Alphanumeric)
            .take(20)
            .map(char::from)
            .collect()
    }

    fn client() -> TaskSyncClient<HttpTaskStore> {
        let store = HttpTaskStore::new(Url::parse(DEFAULT_STORE_URL).unwrap(), None).unwrap();
        TaskSyncClient::new(store)
    }

    #[tokio::test]
    async fn test_e2e_task_lifecycle() {
        let client = client();
        client.load().await.unwrap();
        let before = client.get_tasks().tasks.len();

        let mut draft = random_title();
        let title = draft.clone();
        let created = client.submit_new_task(&mut draft).await.unwrap();
        assert!(draft.is_empty());

        let view = client.get_tasks();
        assert_eq!(view.tasks.len(), before + 1);
        assert_eq!(*view.tasks, client.query().store().list_tasks().await.unwrap());

        let task = view.tasks.iter().find(|t| t.id == created.id).unwrap().clone();
        assert_eq!(task.title, title);
        client.toggle_completion(&task).await.unwrap();
        let toggled = client
            .get_tasks()
            .tasks
            .iter()
            .find(|t| t.id == created.id)
            .unwrap()
            .clone();
        assert!(toggled.is_completed);
        assert!(toggled.updated_at > task.updated_at);

        client.remove_task(&created.id).await.unwrap();
        assert!(client.get_tasks().tasks.iter().all(|t| t.id != created.id));
    }

    #[tokio::test]
    async fn test_e2e_concurrent_submits() {
        let client = client();
        client.load().await.unwrap();

        let mut drafts: Vec<String> = (0..3).map(|_| random_title()).collect();
        let titles: HashSet<String> = drafts.iter().cloned().collect();
        let results = futures::future::join_all(
            drafts.iter_mut().map(|draft| client.submit_new_task(draft)),
        )
        .await;

        let ids: Vec<_> = results.into_iter().map(|r| r.unwrap().id).collect();
        let view = client.get_tasks();
        assert_eq!(
            view.tasks
                .iter()
                .filter(|task| titles.contains(&task.title))
                .count(),
            titles.len()
        );

        for id in ids.iter() {
            client.remove_task(id).await.unwrap();
        }
    }
}
